//! AWS service clients

pub mod context;
pub mod ec2;
pub mod error;
pub mod fsx;
pub mod sfn;
pub mod ssm;

pub use context::AwsContext;
pub use ec2::Ec2Client;
pub use error::store_error;
pub use fsx::FsxClient;
pub use sfn::SfnClient;
pub use ssm::SsmClient;
