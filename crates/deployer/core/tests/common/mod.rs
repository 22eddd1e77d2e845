pub mod deploy_harness;
