//! Command Dispatcher
//!
//! This module turns parsed request lines into datastore operations and maps
//! each outcome to a protocol reply.
//!
//! ## Reply Mapping
//!
//! | Command  | Success                  | Failure                          |
//! |----------|--------------------------|----------------------------------|
//! | `SET`    | `OK`                     | `ERR` (malformed) / `Error in …` |
//! | `GET`    | `VALUE <key>` + value    | `NODATA`                         |
//! | `DELETE` | `OK`                     | `NODATA`                         |
//! | `ALL`    | `ALLVALUES` … `ENDOF…`   |                                  |
//! | `FLUSH`  | `OK`                     |                                  |
//! | other    |                          | `UNKNOWN`                        |
//!
//! The dispatcher is stateless per line. A failed request never affects any
//! other request or connection.

use crate::protocol::{Command, Reply};
use crate::storage::{Datastore, Value};
use std::sync::Arc;
use tracing::{debug, trace};

/// Executes request lines against a shared datastore.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<Datastore>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given datastore.
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }

    /// Returns the datastore this dispatcher operates on.
    pub fn store(&self) -> &Arc<Datastore> {
        &self.store
    }

    /// Parses and executes one request line.
    pub fn execute_line(&self, line: &str) -> Reply {
        let request = line.trim();
        match Command::parse(request) {
            Ok(command) => self.execute(command, request),
            Err(e) => {
                debug!(line = request, error = %e, "Malformed request");
                Reply::Err
            }
        }
    }

    /// Executes a parsed command. `request` is the trimmed line it came from
    /// and is echoed back in error replies.
    pub fn execute(&self, command: Command, request: &str) -> Reply {
        trace!(command = command.name(), "Executing command");
        match command {
            Command::Set { key, value } => self.cmd_set(&key, value, request),
            Command::Get { key } => self.cmd_get(key),
            Command::Delete { key } => self.cmd_delete(&key),
            Command::All => self.cmd_all(),
            Command::Flush => self.cmd_flush(),
            Command::Unknown => Reply::Unknown,
        }
    }

    /// SET key value
    fn cmd_set(&self, key: &str, value: String, request: &str) -> Reply {
        match self.store.set(key, Value::String(value)) {
            Ok(()) => Reply::Ok,
            Err(e) => Reply::error(request, e),
        }
    }

    /// GET key
    fn cmd_get(&self, key: String) -> Reply {
        match self.store.get(&key) {
            Ok(value) => Reply::Value {
                key,
                value: value.to_string(),
            },
            Err(_) => Reply::NoData,
        }
    }

    /// DELETE key
    fn cmd_delete(&self, key: &str) -> Reply {
        match self.store.delete(key) {
            Ok(()) => Reply::Ok,
            Err(_) => Reply::NoData,
        }
    }

    /// ALL
    ///
    /// Pairs are sorted by key so the listing is stable between calls.
    fn cmd_all(&self) -> Reply {
        let mut pairs: Vec<(String, String)> = self
            .store
            .get_all()
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Reply::AllValues(pairs)
    }

    /// FLUSH
    fn cmd_flush(&self) -> Reply {
        self.store.flush_all();
        Reply::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreLimits;

    fn create_dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(Datastore::new()))
    }

    fn wire(reply: Reply) -> String {
        reply.to_string()
    }

    #[test]
    fn test_set_get() {
        let dispatcher = create_dispatcher();

        assert_eq!(wire(dispatcher.execute_line("SET a 1\n")), "OK\r\n");
        assert_eq!(wire(dispatcher.execute_line("GET a\n")), "VALUE a\r\n1\r\n");
    }

    #[test]
    fn test_set_value_with_spaces() {
        let dispatcher = create_dispatcher();

        dispatcher.execute_line("SET greeting hello there world");
        assert_eq!(
            wire(dispatcher.execute_line("GET greeting")),
            "VALUE greeting\r\nhello there world\r\n"
        );
    }

    #[test]
    fn test_set_malformed() {
        let dispatcher = create_dispatcher();
        assert_eq!(dispatcher.execute_line("SET a\n"), Reply::Err);
    }

    #[test]
    fn test_set_duplicate() {
        let dispatcher = create_dispatcher();

        dispatcher.execute_line("SET a 1");
        assert_eq!(
            wire(dispatcher.execute_line("SET a 2\n")),
            "Error in SET a 2 : Key already exists\r\n"
        );
        assert_eq!(wire(dispatcher.execute_line("GET a")), "VALUE a\r\n1\r\n");
    }

    #[test]
    fn test_set_invalid_key() {
        let dispatcher = create_dispatcher();

        assert_eq!(
            wire(dispatcher.execute_line("SET bad!key v")),
            "Error in SET bad!key v : Key with special characters is not allowed\r\n"
        );
        assert_eq!(
            wire(dispatcher.execute_line("SET  v")),
            "Error in SET  v : Empty key is not allowed\r\n"
        );
    }

    #[test]
    fn test_set_out_of_memory() {
        let store = Arc::new(Datastore::with_limits(StoreLimits {
            max_entries: 1,
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(store);

        assert_eq!(dispatcher.execute_line("SET a 1"), Reply::Ok);
        assert_eq!(
            wire(dispatcher.execute_line("SET b 2")),
            "Error in SET b 2 : Out of memory\r\n"
        );
    }

    #[test]
    fn test_get_missing() {
        let dispatcher = create_dispatcher();

        assert_eq!(dispatcher.execute_line("GET missing\n"), Reply::NoData);
        assert_eq!(dispatcher.execute_line("GET bad!key"), Reply::NoData);
    }

    #[test]
    fn test_get_renders_typed_values() {
        let dispatcher = create_dispatcher();
        dispatcher.store().set("n", Value::Integer(45)).unwrap();

        assert_eq!(wire(dispatcher.execute_line("GET n")), "VALUE n\r\n45\r\n");
    }

    #[test]
    fn test_delete() {
        let dispatcher = create_dispatcher();

        dispatcher.execute_line("SET a 1");
        assert_eq!(dispatcher.execute_line("DELETE a\n"), Reply::Ok);
        assert_eq!(dispatcher.execute_line("GET a\n"), Reply::NoData);
        assert_eq!(dispatcher.execute_line("DELETE a\n"), Reply::NoData);
    }

    #[test]
    fn test_all() {
        let dispatcher = create_dispatcher();

        assert_eq!(
            wire(dispatcher.execute_line("ALL")),
            "ALLVALUES\r\nENDOFALLVALUES\r\n"
        );

        dispatcher.execute_line("SET b 2");
        dispatcher.execute_line("SET a 1");
        assert_eq!(
            wire(dispatcher.execute_line("ALL\n")),
            "ALLVALUES\r\na=1\r\nb=2\r\nENDOFALLVALUES\r\n"
        );
    }

    #[test]
    fn test_flush() {
        let dispatcher = create_dispatcher();

        dispatcher.execute_line("SET a 1");
        dispatcher.execute_line("SET b 2");
        assert_eq!(dispatcher.execute_line("FLUSH\n"), Reply::Ok);
        assert!(dispatcher.store().is_empty());
        assert_eq!(dispatcher.execute_line("GET a"), Reply::NoData);
    }

    #[test]
    fn test_unknown() {
        let dispatcher = create_dispatcher();

        assert_eq!(wire(dispatcher.execute_line("FOO\n")), "UNKNOWN\r\n");
        assert_eq!(dispatcher.execute_line("set a 1"), Reply::Unknown);
        assert_eq!(dispatcher.execute_line(""), Reply::Unknown);
    }

    #[test]
    fn test_dispatchers_share_store() {
        let store = Arc::new(Datastore::new());
        let first = Dispatcher::new(Arc::clone(&store));
        let second = Dispatcher::new(Arc::clone(&store));

        first.execute_line("SET shared yes");
        assert_eq!(
            wire(second.execute_line("GET shared")),
            "VALUE shared\r\nyes\r\n"
        );
    }
}
