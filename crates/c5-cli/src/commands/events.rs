//! Events command implementation.

use c5_canonical::{traverse, EventLog};

use crate::input::read_value;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_value(input)?;
    let mut log = EventLog::new();
    traverse(&value, &mut log);
    for entry in log.entries() {
        println!("{}", entry);
    }
    Ok(())
}
