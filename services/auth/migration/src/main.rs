use sea_orm_migration::prelude::*;

use keystep_auth_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
