pub mod controller;
pub mod jwt;
pub mod middleware;
pub mod permissions;
pub mod service;
