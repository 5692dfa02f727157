mod common;
mod fetcher_tests;
mod places_tests;
