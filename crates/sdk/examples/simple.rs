//! Simple SDK Example
//!
//! Walks one queue through a short service round.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package waitline-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package waitline-sdk --example simple
//!    ```

use waitline_sdk::{CreateQueueRequest, JoinQueueRequest, QueueStatus, WaitlineClient};

const STAFF_ID: &str = "staff-demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Waitline SDK - Simple Example");
    println!("=============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = WaitlineClient::connect("http://127.0.0.1:9530").await?;
    let health = client.health().await?;
    println!("   ✓ Connected (v{})\n", health.version);

    // 2. Open a queue
    println!("2. Creating a queue...");
    let queue = client
        .create_queue(&CreateQueueRequest {
            staff_id: STAFF_ID.to_string(),
            name: format!("Front Desk {}", std::process::id()),
            business_name: "Demo Clinic".to_string(),
            description: None,
            address: None,
            estimated_wait_minutes: Some(10),
        })
        .await?;
    println!("   ✓ Queue {} ({} min per customer)\n", queue.id, queue.estimated_wait_minutes);

    // 3. Three customers join
    println!("3. Customers joining...");
    let mut entries = Vec::new();
    for (name, phone) in [
        ("Ada", "+15550000001"),
        ("Grace", "+15550000002"),
        ("Linus", "+15550000003"),
    ] {
        let entry = client
            .join_queue(&JoinQueueRequest {
                queue_id: queue.id.clone(),
                customer_name: name.to_string(),
                phone_number: phone.to_string(),
                party_size: None,
            })
            .await?;
        println!(
            "   - {} at position {} (~{} min)",
            entry.customer_name, entry.position, entry.estimated_wait_minutes
        );
        entries.push(entry);
    }
    println!();

    // 4. Serve the head of the line
    println!("4. Calling next...");
    if let Some(called) = client.call_next(STAFF_ID, &queue.id).await? {
        println!("   ✓ Called {}", called.customer_name);
        client.mark_served(STAFF_ID, called.id).await?;
        println!("   ✓ Served {}\n", called.customer_name);
    }

    // 5. The second customer leaves; the third moves up
    println!("5. Grace cancels...");
    client.cancel_entry(entries[1].id, None).await?;
    let last = client.get_entry(entries[2].id).await?;
    println!(
        "   ✓ {} is now at position {} (~{} min)\n",
        last.customer_name, last.position, last.estimated_wait_minutes
    );

    // 6. Close up
    println!("6. Closing the queue...");
    client
        .set_queue_status(STAFF_ID, &queue.id, QueueStatus::Closed)
        .await?;
    println!("   ✓ Closed");

    println!("\n✓ Example completed successfully!");

    Ok(())
}
