//! Sequential replay of recorded interactions.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

type Channel = (String, String);

/// Serves a cassette's interactions back in recording order, with an
/// independent queue for every `port::method` channel.
pub struct CassetteReplayer {
    pending: HashMap<Channel, VecDeque<Interaction>>,
    served: HashMap<Channel, usize>,
}

impl CassetteReplayer {
    /// Queues every interaction of `cassette`.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut pending: HashMap<Channel, VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            pending
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { pending, served: HashMap::new() }
    }

    /// Takes the next interaction recorded for `port::method`.
    ///
    /// # Panics
    ///
    /// Panics when the channel was never recorded or is used up; the message
    /// names the recorded channels or how many were served.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Interaction {
        let channel = (port.to_string(), method.to_string());
        let Some(queue) = self.pending.get_mut(&channel) else {
            let mut recorded: Vec<String> =
                self.pending.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            recorded.sort();
            panic!(
                "Cassette exhausted: no interactions recorded for {port}::{method} \
                 (recorded: [{}])",
                recorded.join(", ")
            );
        };

        let served = self.served.entry(channel).or_insert(0);
        let Some(interaction) = queue.pop_front() else {
            panic!("Cassette exhausted: {port}::{method} already served all {served} recorded calls");
        };
        *served += 1;
        interaction
    }

    /// Takes the first queued `port::method` interaction whose recorded input
    /// satisfies `matches`, falling back to the next one in recording order.
    ///
    /// Calls that were issued concurrently can reach the replayer in a
    /// different order than they were recorded in.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Self::next_interaction`].
    pub fn next_matching(
        &mut self,
        port: &str,
        method: &str,
        matches: impl Fn(&serde_json::Value) -> bool,
    ) -> Interaction {
        if let Some(queue) = self.pending.get_mut(&(port.to_string(), method.to_string())) {
            match queue.iter().position(|interaction| matches(&interaction.input)) {
                Some(index) => {
                    if let Some(interaction) = queue.remove(index) {
                        queue.push_front(interaction);
                    }
                }
                None if !queue.is_empty() => {
                    tracing::warn!(port, method, "no recorded input matches; replaying in order");
                }
                None => {}
            }
        }
        self.next_interaction(port, method)
    }

    /// Interactions still queued for `port::method`.
    #[must_use]
    pub fn remaining(&self, port: &str, method: &str) -> usize {
        self.pending
            .get(&(port.to_string(), method.to_string()))
            .map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn llm_reply(text: &str) -> Interaction {
        Interaction::new("llm", "complete", json!({}), json!({"ok": {"text": text}}))
    }

    #[test]
    fn replays_each_port_in_order() {
        let cassette = Cassette::from_interactions(
            "test",
            vec![
                llm_reply("1"),
                Interaction::new("fs", "list_dir", json!({"path": "/x"}), json!({"ok": []})),
                llm_reply("2"),
            ],
        );

        let mut replayer = CassetteReplayer::new(&cassette);

        let first = replayer.next_interaction("llm", "complete");
        assert_eq!(first.seq, 0);
        assert_eq!(first.output, json!({"ok": {"text": "1"}}));

        let listing = replayer.next_interaction("fs", "list_dir");
        assert_eq!(listing.seq, 1);

        let second = replayer.next_interaction("llm", "complete");
        assert_eq!(second.seq, 2);
        assert_eq!(replayer.remaining("llm", "complete"), 0);
    }

    #[test]
    fn remaining_counts_unconsumed_interactions() {
        let cassette =
            Cassette::from_interactions("test", vec![llm_reply("a"), llm_reply("b")]);
        let mut replayer = CassetteReplayer::new(&cassette);

        assert_eq!(replayer.remaining("llm", "complete"), 2);
        let _ = replayer.next_interaction("llm", "complete");
        assert_eq!(replayer.remaining("llm", "complete"), 1);
        assert_eq!(replayer.remaining("fs", "read_to_string"), 0);
    }

    #[test]
    fn matching_input_is_served_out_of_order() {
        let prompt = |p: &str, text: &str| {
            Interaction::new("llm", "complete", json!({"prompt": p}), json!({"ok": {"text": text}}))
        };
        let cassette = Cassette::from_interactions(
            "test",
            vec![prompt("a", "about a"), prompt("b", "about b"), prompt("a", "again a")],
        );
        let mut replayer = CassetteReplayer::new(&cassette);

        let b = replayer.next_matching("llm", "complete", |input| input["prompt"] == "b");
        assert_eq!(b.output["ok"]["text"], "about b");
        let a = replayer.next_matching("llm", "complete", |input| input["prompt"] == "a");
        assert_eq!(a.output["ok"]["text"], "about a");
        let other = replayer.next_matching("llm", "complete", |input| input["prompt"] == "z");
        assert_eq!(other.output["ok"]["text"], "again a");
        assert_eq!(replayer.remaining("llm", "complete"), 0);
    }

    #[test]
    #[should_panic(expected = "Cassette exhausted")]
    fn exhausted_replayer_panics_with_descriptive_message() {
        let cassette = Cassette::from_interactions("test", vec![llm_reply("only")]);

        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("llm", "complete");
        let _ = replayer.next_interaction("llm", "complete");
    }

    #[test]
    #[should_panic(expected = "no interactions recorded")]
    fn unknown_port_panics() {
        let cassette = Cassette::from_interactions("test", vec![]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("llm", "complete");
    }
}
