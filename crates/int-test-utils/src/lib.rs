#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

mod anvil;
pub use anvil::{
    AnvilNode,
    spawn_anvil,
};

mod artifacts;
pub use artifacts::{
    ADDRESS_CONSTRUCTOR_ABI,
    NO_CONSTRUCTOR_ABI,
    STUB_INIT_CODE,
    STUB_RUNTIME_CODE,
    ArtifactDir,
    write_artifact,
};

mod mock_network;
pub use mock_network::{
    MockNetwork,
    SentDeployment,
};
