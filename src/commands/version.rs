use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("rigtune version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
