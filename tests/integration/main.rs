//! End-to-end tests of the job lifecycle against the in-process store.

mod concurrency_test;
mod dashboard_test;
mod helpers;
mod lifecycle_test;
mod store_outage_test;
