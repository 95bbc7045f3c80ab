pub mod ledger_proptest;
