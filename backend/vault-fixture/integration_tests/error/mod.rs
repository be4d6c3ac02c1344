mod server;
mod token_file;
mod vault_client;
