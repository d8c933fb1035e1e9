use glam::Vec3;

use crate::controller::fixtures::FixtureConfig;
use crate::controller::physics::BodyShape;
use crate::model::entity::{EntityDesc, EntityKind, VisualSource};

/// Everything placed in the room at startup, in spawn order.
#[derive(Debug, Clone, Default)]
pub struct RoomLayout {
    pub entities: Vec<EntityDesc>,
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// #092E66
const GROUND_BLUE: [f32; 3] = [9.0 / 255.0, 46.0 / 255.0, 102.0 / 255.0];

fn model(uri: &str) -> VisualSource {
    VisualSource::Model { uri: uri.to_string() }
}

impl RoomLayout {
    pub fn default_room(fixtures: &FixtureConfig) -> Self {
        let entities = vec![
            EntityDesc::new("ground", Vec3::new(50.0, 0.1, 50.0))
                .elevation(0.0)
                .visual(VisualSource::Primitive { color: GROUND_BLUE }),
            EntityDesc::new("floor", Vec3::new(5.0, 0.4, 5.0))
                .elevation(0.0)
                .visual(VisualSource::Primitive { color: WHITE }),
            EntityDesc::new("wall1", Vec3::new(5.0, 3.0, 0.2)).at(0.0, -2.4),
            EntityDesc::new("wall2", Vec3::new(0.2, 3.0, 4.8)).at(2.4, 0.1),
            EntityDesc::new("desk", Vec3::new(1.8, 0.8, 0.75))
                .at(1.2, -1.9)
                .visual(model("/models/desk.glb")),
            EntityDesc::new("lamp", Vec3::new(0.5, 1.8, 0.5))
                .at(0.0, -1.7)
                .kind(EntityKind::lamp(fixtures.lamp_on_intensity))
                .visual(model("/models/lamp.glb")),
            EntityDesc::new("roboticVaccum", Vec3::new(0.5, 0.1, 0.5))
                .at(-1.0, 0.0)
                .kind(EntityKind::vacuum(fixtures.vacuum_angle_step))
                .visual(model("/models/vaccum.glb")),
            EntityDesc::new("magazine", Vec3::new(0.2, 0.02, 0.29))
                .at(0.7, -2.2)
                .height_at(1.32)
                .rotation(Vec3::new(52f32.to_radians(), 0.0, 0.0))
                .visual(VisualSource::Textured {
                    uri: "/models/magazine.jpg".into(),
                }),
            EntityDesc::new("player", Vec3::new(0.5, 1.3, 0.5))
                .at(0.0, 2.0)
                .kind(EntityKind::player())
                .shape(BodyShape::Capsule {
                    half_height: 0.4,
                    radius: 0.25,
                })
                .mass(30.0)
                .material("player")
                .visual(VisualSource::Hidden),
        ];
        Self { entities }
    }

    pub fn find(&self, name: &str) -> Option<&EntityDesc> {
        self.entities.iter().find(|desc| desc.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::BehaviorTag;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let room = RoomLayout::default_room(&FixtureConfig::default());
        let names: HashSet<_> = room.entities.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), room.entities.len());
    }

    #[test]
    fn fixtures_carry_their_behaviour() {
        let room = RoomLayout::default_room(&FixtureConfig::default());
        let tag = |name: &str| room.find(name).map(|d| d.kind.tag());
        assert_eq!(tag("lamp"), Some(BehaviorTag::Powered));
        assert_eq!(tag("roboticVaccum"), Some(BehaviorTag::Mobile));
        assert_eq!(tag("player"), Some(BehaviorTag::Player));
        assert_eq!(tag("wall1"), Some(BehaviorTag::Static));
    }

    #[test]
    fn player_stands_on_the_floor() {
        let room = RoomLayout::default_room(&FixtureConfig::default());
        let floor = room.find("floor").expect("floor");
        let player = room.find("player").expect("player");
        let floor_top = floor.position().y + floor.half_extents().y;
        let feet = player.position().y - (0.4 + 0.25);
        assert!((feet - floor_top).abs() < 1e-5);
    }

    #[test]
    fn magazine_rests_tilted_at_its_explicit_height() {
        let room = RoomLayout::default_room(&FixtureConfig::default());
        let magazine = room.find("magazine").expect("magazine");
        assert_eq!(magazine.position(), Vec3::new(0.7, 1.32, -2.2));
        assert!((magazine.rotation.x - 52f32.to_radians()).abs() < 1e-6);
    }
}
