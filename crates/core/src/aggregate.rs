//! Identity and decide/evolve semantics shared by the ledger's state machines.

/// Anything with a stable identity: items keep their SKU, users their username.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// Index of the entity carrying `id`, if any.
pub fn position_of<E: Entity>(entities: &[E], id: &E::Id) -> Option<usize> {
    entities.iter().position(|e| e.id() == id)
}

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd)` returns events.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// Aggregates must not perform IO. Persisting the returned events, and only
/// then applying them, is the caller's job.
pub trait Aggregate: Entity {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit given the current state and a command.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Bin {
        label: String,
        count: u32,
    }

    impl Entity for Bin {
        type Id = String;

        fn id(&self) -> &String {
            &self.label
        }
    }

    impl Aggregate for Bin {
        type Command = u32;
        type Event = u32;
        type Error = ();

        fn apply(&mut self, event: &u32) {
            self.count += event;
        }

        fn handle(&self, command: &u32) -> Result<Vec<u32>, ()> {
            if *command == 0 { Err(()) } else { Ok(vec![*command]) }
        }
    }

    #[test]
    fn handle_decides_and_apply_evolves() {
        let mut bin = Bin { label: "A".into(), count: 1 };
        let events = bin.handle(&3).unwrap();
        assert_eq!(bin.count, 1);
        for e in &events {
            bin.apply(e);
        }
        assert_eq!(bin.count, 4);
        assert!(bin.handle(&0).is_err());
    }

    #[test]
    fn position_of_finds_by_identity() {
        let bins = vec![
            Bin { label: "A".into(), count: 0 },
            Bin { label: "B".into(), count: 0 },
        ];
        assert_eq!(position_of(&bins, &"B".to_string()), Some(1));
        assert_eq!(position_of(&bins, &"Z".to_string()), None);
    }
}
