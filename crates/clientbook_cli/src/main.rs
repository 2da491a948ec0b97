//! Composition-root walkthrough for the clientbook access layer.
//!
//! # Responsibility
//! - Wire context, unit of work, repository and service explicitly, the way
//!   a request scope would.
//! - Keep output deterministic for quick local sanity checks.

use clientbook_core::{open_db_in_memory, Client, ClientService, StoreContext, UnitOfWork};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let mut uow = UnitOfWork::new(StoreContext::new(conn));
    let service = ClientService::new(uow.client_repository().clone());

    service.add(&Client::new(1, "Ada Lovelace").with_email("ada@example.com"))?;
    service.add(&Client::new(2, "Alan Turing"))?;

    let affected = uow.commit().await?;
    println!("clientbook committed rows={affected}");

    for client in service.list()? {
        println!(
            "client id={} name={} email={}",
            client.id,
            client.name,
            client.email.as_deref().unwrap_or("-")
        );
    }

    uow.dispose_async().await;
    println!("clientbook disposed={}", uow.is_disposed());
    Ok(())
}
