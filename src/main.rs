// DualCom - Dual serial port debugging workbench
use clap::Parser;
use dualcom::cli::{execute_command, Args, ConsoleWriter, OutputWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let writer = ConsoleWriter::new(args.output);

    if let Err(e) = execute_command(args).await {
        writer.write_error(&e.to_string())?;
        std::process::exit(1);
    }
    Ok(())
}
