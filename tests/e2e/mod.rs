// End-to-end tests for the Lesson Forge generation API
//
// Each test serves the real router, controllers and services on a random port.
// Every external collaborator (model, speech, image, blob storage and the
// content store) is replaced by the in-memory fakes in `helpers::fakes`, so
// tests run in parallel without network access.
//
// `test_store` exercises the Postgres content store against a testcontainers
// instance and is ignored by default; run it with `cargo test -- --ignored`.

mod helpers;
mod test_generator;
mod test_store;
