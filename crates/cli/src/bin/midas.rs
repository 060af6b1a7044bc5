use anyhow::Result;

fn main() -> Result<()> {
    midas_cli::main_entry()
}
