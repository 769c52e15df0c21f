// HTTP Integration Tests
//
// SERVICE: NodeClient against a mockito node, gateway and matcher
// TESTS: scenarios driven end to end over HTTP
//        - Fee boundary with returned and raised rejections
//        - Server faults surface as infrastructure errors
//        - Order cleanup through the matcher cancel endpoint

mod orders;
mod transfers;

// Make common utilities available
#[path = "../src/common/mod.rs"]
mod common;
