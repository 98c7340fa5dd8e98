use std::process;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if let Err(err) = kalshi_trade_archive::run(args).await {
        eprintln!("kalshi-trades failed: {:#}", err);
        process::exit(1);
    }
}
