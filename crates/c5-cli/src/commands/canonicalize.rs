//! Canonicalize command implementation.

use c5_canonical::{Canonicalizer, JsonProps};

use crate::input::read_value;

pub fn run(input: Option<String>, indent: usize) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_value(input)?;
    let canonicalizer = Canonicalizer::new(JsonProps::indented(indent));
    println!("{}", canonicalizer.render(&value));
    Ok(())
}
