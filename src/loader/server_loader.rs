//! Loading settings from a running server

use tracing::{error, info};

use super::SourceLoader;
use crate::server::{GucServer, PgServer};

impl SourceLoader {
    /// Loads the non-default settings a server reports.
    ///
    /// Query failures are logged; rows read before the failure are kept.
    pub async fn load_server<S: GucServer + ?Sized>(&mut self, server: &mut S) -> usize {
        let rows = match server.non_default_settings().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("❌ Cannot read settings from server: {}", e);
                self.record_failure();
                return 0;
            }
        };

        let count = rows.len();
        for row in rows {
            self.add(&row.name, &row.value, &row.sourcefile);
        }

        info!("🗄️  Read {} non-default settings from server", count);
        count
    }

    /// Connects with `conninfo`, loads the server's settings and disconnects.
    pub async fn load_conninfo(&mut self, conninfo: &str) -> usize {
        let mut server = match PgServer::connect(conninfo).await {
            Ok(server) => server,
            Err(e) => {
                error!("❌ Cannot connect to source server: {}", e);
                self.record_failure();
                return 0;
            }
        };

        let count = self.load_server(&mut server).await;
        if let Err(e) = server.close().await {
            error!("❌ Error closing source connection: {}", e);
        }
        count
    }
}
