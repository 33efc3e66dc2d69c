pub mod http_backup_sync;
