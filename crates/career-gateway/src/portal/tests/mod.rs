mod accounts;
mod careers;
mod common;
