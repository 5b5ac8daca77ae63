use anyhow::{Context, Result};
use clap::Parser;
use ferroftp::core_cli::ClientArgs;
use ferroftp::core_client::FtpClient;
use log::error;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ClientArgs::parse();
    ferroftp::core_log::init(Path::new(&args.logfile), None)
        .context("Failed to open log file")?;

    let mut ftp = FtpClient::connect(&args.host, args.port).await?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let username = prompt(&mut stdin, "Login: ").await?;
    let password = prompt(&mut stdin, "Password: ").await?;
    ftp.login(username.trim(), password.trim()).await?;

    loop {
        print!(">");
        std::io::stdout().flush()?;
        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let command = line.trim().to_string();
        if command.is_empty() {
            continue;
        }
        if let Err(e) = ftp.execute(&command).await {
            error!("ERROR: {}", e);
            break;
        }
        if command.to_ascii_lowercase().starts_with("quit") {
            break;
        }
    }
    Ok(())
}

async fn prompt(
    stdin: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    label: &str,
) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(stdin.next_line().await?.unwrap_or_default())
}
