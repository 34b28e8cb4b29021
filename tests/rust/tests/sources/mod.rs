//! Provider integration tests against mock HTTP servers
