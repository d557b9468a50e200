//! Screen implementations. Each screen is a top-level Component.

pub mod directory;
pub mod kinds;
pub mod tabbed;
pub mod wizard;

use idcon_core::model::IMPLEMENTATION_TYPES;

use crate::component::Component;
use crate::screen::ScreenId;

use directory::DirectoryScreen;
use tabbed::TabbedScreen;

/// Create screen components for the tab bar.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    let schemas = TabbedScreen::new(vec![
        (
            "Plain",
            Box::new(DirectoryScreen::new(ScreenId::Schemas, kinds::PlainSchemas)) as Box<dyn Component>,
        ),
        (
            "Derived",
            Box::new(DirectoryScreen::new(ScreenId::Schemas, kinds::DerSchemas)),
        ),
        (
            "Virtual",
            Box::new(DirectoryScreen::new(ScreenId::Schemas, kinds::VirSchemas)),
        ),
    ]);

    let implementations = TabbedScreen::new(
        IMPLEMENTATION_TYPES
            .iter()
            .map(|&kind| {
                let tab: Box<dyn Component> = Box::new(DirectoryScreen::new(
                    ScreenId::Implementations,
                    kinds::Implementations(kind),
                ));
                (kind, tab)
            })
            .collect(),
    );

    vec![
        (ScreenId::Users, Box::new(DirectoryScreen::new(ScreenId::Users, kinds::Users))),
        (ScreenId::Groups, Box::new(DirectoryScreen::new(ScreenId::Groups, kinds::Groups))),
        (ScreenId::Roles, Box::new(DirectoryScreen::new(ScreenId::Roles, kinds::Roles))),
        (ScreenId::Realms, Box::new(DirectoryScreen::new(ScreenId::Realms, kinds::Realms))),
        (ScreenId::Schemas, Box::new(schemas)),
        (
            ScreenId::Applications,
            Box::new(DirectoryScreen::new(ScreenId::Applications, kinds::Applications)),
        ),
        (ScreenId::Implementations, Box::new(implementations)),
        (ScreenId::Domains, Box::new(DirectoryScreen::new(ScreenId::Domains, kinds::Domains))),
        (ScreenId::Parameters, Box::new(DirectoryScreen::new(ScreenId::Parameters, kinds::Params))),
    ]
}
