//! Configuration section definitions.
//!
//! Each module corresponds to a section in `skiff.toml`:
//!
//! | Module   | TOML Section        | Purpose                          |
//! |----------|---------------------|----------------------------------|
//! | `build`  | `[build]`           | Content, output and cache paths  |
//! | `deploy` | `[deploy.github]`   | Branches, remote, deploy helper  |
//! | `site`   | `[site]`            | Site metadata                    |

mod build;
mod deploy;
mod site;

pub use build::BuildSectionConfig;
pub use deploy::DeployConfig;
pub use site::SiteSectionConfig;
