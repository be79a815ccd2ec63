use std::fs;
use std::path::{Path, PathBuf};

pub struct TestFixtures;

impl TestFixtures {
    /// Customized configuration of an old 9.4 cluster.
    pub fn old_postgresql_conf() -> &'static str {
        "# -----------------------------\n\
         # PostgreSQL configuration file\n\
         # -----------------------------\n\
         \n\
         listen_addresses = '*'\t\t# what IP address(es) to listen on;\n\
         port = 5432\n\
         shared_buffers = 256MB\t\t\t# min 128kB\n\
         work_mem = 4MB\n\
         #maintenance_work_mem = 64MB\n\
         checkpoint_segments = 10\t\t# in logfile segments, min 1, 16MB each\n\
         log_line_prefix = '%t [%p]: # '\n\
         default_with_oids = off\n\
         pg_stat_statements.max = 10000\n"
    }

    /// Overrides written by ALTER SYSTEM on the old cluster.
    pub fn old_auto_conf() -> &'static str {
        "# Do not edit this file manually!\n\
         # It will be overwritten by the ALTER SYSTEM command.\n\
         work_mem = '4MB'\n"
    }

    /// Stock configuration of a freshly initialized new cluster.
    pub fn new_postgresql_conf() -> &'static str {
        "# -----------------------------\n\
         # PostgreSQL configuration file\n\
         # -----------------------------\n\
         \n\
         #listen_addresses = 'localhost'\t\t# what IP address(es) to listen on;\n\
         port = 5432\t\t\t\t# (change requires restart)\n\
         \n\
         # - Memory -\n\
         \n\
         shared_buffers = 128MB\t\t\t# min 128kB\n\
         #work_mem = 4MB\t\t\t\t# min 64kB\n\
         \n\
         # - Checkpoints -\n\
         \n\
         #max_wal_size = 1GB\n\
         #min_wal_size = 80MB\n\
         \n\
         #log_line_prefix = '%m [%p] '\t\t# special values:\n\
         \n\
         include_dir = 'conf.d'\n"
    }

    pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
