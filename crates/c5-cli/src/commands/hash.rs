//! Hash command implementation.

use c5_canonical::content_hash;

use crate::input::read_value;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_value(input)?;
    println!("{}", content_hash(&value));
    Ok(())
}
