use regen::{GeneratorArgs, Regex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pattern = std::env::args().nth(1).expect("give me a regex pattern");
    let n = std::env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);
    let regex = Regex::compile(&pattern, GeneratorArgs::default())?;
    for result in regex.samples().take(n) {
        println!("{}", result);
    }
    Ok(())
}
