use crate::save::{OverworldSnapshot, Waypoint};
use log::debug;

/// Live overworld progress
#[derive(Debug, Clone, PartialEq)]
pub struct Overworld {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

impl Overworld {
    /// Builds an overworld from its design-time waypoint names; only the
    /// first waypoint is accessible
    pub fn new(name: impl Into<String>, waypoint_names: &[&str]) -> Self {
        let waypoints = waypoint_names
            .iter()
            .enumerate()
            .map(|(index, wp)| Waypoint::new(*wp, index == 0, false))
            .collect();
        Overworld {
            name: name.into(),
            waypoints,
        }
    }

    pub fn waypoint(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|wp| wp.name == name)
    }

    /// Marks a waypoint completed and opens the next one
    pub fn complete(&mut self, name: &str) -> bool {
        let Some(index) = self.waypoints.iter().position(|wp| wp.name == name) else {
            return false;
        };
        self.waypoints[index].completed = true;
        self.waypoints[index].access = true;
        if let Some(next) = self.waypoints.get_mut(index + 1) {
            next.access = true;
        }
        true
    }

    pub fn save(&self) -> OverworldSnapshot {
        OverworldSnapshot {
            name: self.name.clone(),
            waypoints: self.waypoints.clone(),
        }
    }

    /// Applies saved flags by waypoint name; names the design no longer has
    /// are ignored
    pub fn restore(&mut self, snapshot: &OverworldSnapshot) {
        for saved in &snapshot.waypoints {
            match self.waypoints.iter_mut().find(|wp| wp.name == saved.name) {
                Some(waypoint) => {
                    waypoint.access = saved.access;
                    waypoint.completed = saved.completed;
                }
                None => debug!(
                    "overworld '{}': saved waypoint '{}' no longer exists",
                    self.name, saved.name
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_opens_next() {
        let mut world = Overworld::new("world_1", &["start", "castle", "end"]);
        assert!(world.waypoint("start").unwrap().access);
        assert!(!world.waypoint("castle").unwrap().access);

        assert!(world.complete("start"));
        assert!(world.waypoint("castle").unwrap().access);
        assert!(!world.complete("missing"));
    }

    #[test]
    fn test_restore_by_name() {
        let mut world = Overworld::new("world_1", &["start", "castle"]);
        world.complete("start");
        let mut snapshot = world.save();
        snapshot.waypoints.push(Waypoint::new("removed", true, true));

        let mut fresh = Overworld::new("world_1", &["castle", "start"]);
        fresh.restore(&snapshot);
        assert_eq!(fresh.waypoint("start"), Some(&Waypoint::new("start", true, true)));
        assert_eq!(fresh.waypoint("castle"), Some(&Waypoint::new("castle", true, false)));
        assert_eq!(fresh.waypoints.len(), 2);
    }
}
