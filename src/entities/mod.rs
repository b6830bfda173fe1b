//! Persistable entities
//!
//! Reference implementations of the Saveable contract:
//! - Enemy: design-time placed object, diff-encoded against its baseline
//! - Slime: spawnable enemy variant
//! - DroppedItem: spawnable pickup
//! - Player: the player property set (not a level object)

/// Declares an enum stored in save files as its integer code
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),*
        }

        impl $name {
            pub fn code(self) -> i32 {
                match self {
                    $($name::$variant => $code),*
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $(c if c == $code => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl crate::save::FromAttribute for $name {
            const EXPECTED: &'static str = concat!(stringify!($name), " code");

            fn from_attribute(raw: &str) -> Option<Self> {
                raw.trim().parse::<i32>().ok().and_then(Self::from_code)
            }
        }

        impl crate::save::ToAttribute for $name {
            fn to_attribute(&self) -> String {
                self.code().to_string()
            }
        }
    };
}

pub mod dropped_item;
pub mod enemy;
pub mod player;
pub mod slime;

// Re-export main types for convenient access
pub use dropped_item::DroppedItem;
pub use enemy::{Direction, Enemy, EnemyState, MovingState};
pub use player::{ItemStack, Player, PowerUp};
pub use slime::Slime;
