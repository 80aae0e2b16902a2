use biextract_core::error::BiextractError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), BiextractError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
