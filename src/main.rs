#[tokio::main]
async fn main() {
    if let Err(e) = stockroom_lib::run().await {
        log::error!("{}", e);
        eprintln!("stockroom: {}", e);
        std::process::exit(1);
    }
}
