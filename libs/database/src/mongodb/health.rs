use mongodb::Client;
use mongodb::bson::doc;

/// Send `{ping: 1}` to the admin database
pub async fn ping(client: &Client) -> Result<(), mongodb::error::Error> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
}
