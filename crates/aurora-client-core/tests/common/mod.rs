pub mod scheduler_server;
