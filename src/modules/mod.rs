pub mod admin;
pub mod books;

use catalog_kernel::{settings::Settings, ModuleRegistry};

/// Register all catalog modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    registry.register(books::create_module(settings)?)?;
    registry.register(admin::create_module(settings))?;
    Ok(())
}
