// Suite Integration Tests
//
// SERVICE: in-process simulated ledger (no network)
// TESTS: the full scenario catalog in both rejection modes
//        - Catalog runs clean, spam skipped by default
//        - Literal issue/reissue/burn boundaries through the service trait
//        - Settlement timeouts surface as errors, not failures

mod catalog;
mod lifecycle;
mod settlement;

// Make common utilities available
#[path = "../src/common/mod.rs"]
mod common;
