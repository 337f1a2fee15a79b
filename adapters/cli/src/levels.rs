use grid_tactics_core::PlayerKind;
use grid_tactics_world::LevelSpec;

/// Level bundled with the binary so `play` works out of the box.
///
/// Two knights hold the west side against four spiders; a lake splits the
/// southern approach.
pub(crate) fn gentle_plains() -> LevelSpec {
    let cells = [
        "GK1", "G", "G", "GS2", "G", "GS2", //
        "GK1", "G", "GS2", "G", "G", "GS2", //
        "G", "G", "W", "W", "G", "G",
    ];

    LevelSpec {
        name: "gentle-plains".to_owned(),
        display_name: "Gentle Plains".to_owned(),
        width: 6,
        height: 3,
        max_turns: 10,
        players: vec![PlayerKind::Human, PlayerKind::Computer],
        cells: cells.iter().map(|code| (*code).to_owned()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::gentle_plains;
    use grid_tactics_world::World;

    #[test]
    fn bundled_level_loads() {
        let world = World::from_level(&gentle_plains());
        assert!(world.is_ok());
    }
}
