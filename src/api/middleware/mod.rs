//! Middleware stack. Only access logging: the server is local and
//! unauthenticated, the credential travels with each analyze request.

pub mod access;
