mod dev_server;
mod scan;
mod token_file;
