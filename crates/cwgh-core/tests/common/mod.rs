pub mod contents_server;
