use order_queue::{BrokerConfig, BrokerConnection, Order, OrderPublisher, OrderQueueError, QueueTopology};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};

const SAMPLE_ORDER_COUNT: i32 = 5;

async fn publish_sample_orders(config: &BrokerConfig) -> Result<(), OrderQueueError> {
    BrokerConnection::run_scoped(config, |channel| async move {
        QueueTopology::new(channel.clone())
            .declare(&config.main_queue, &config.dead_letter_queue)
            .await?;

        log::info!("Publishing {} sample orders...", SAMPLE_ORDER_COUNT);
        let publisher = OrderPublisher::new(channel);
        for i in 1..=SAMPLE_ORDER_COUNT {
            let order = Order::new(format!("Product {}", i), i, Decimal::from(i * 10));
            publisher.publish(&config.main_queue, &order).await?;
        }
        log::info!("Done publishing orders. Press Enter to exit.");

        let mut line = String::new();
        if let Err(e) = BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            log::warn!("Could not read from stdin: {}", e);
        }
        Ok(())
    })
    .await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BrokerConfig::from_env();

    if let Err(e) = publish_sample_orders(&config).await {
        log::error!("Publisher failed: {}", e);
        std::process::exit(1);
    }
}
