#![deny(rust_2018_idioms)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

use log::info;

use rumorcast::GossipNode;
use rumorcast_config::Config;
use rumorcast_data_structures::{NullSnapshotSink, TombstoneReason};

/// A minimal illustrative driver: posts a rumor, casts a few votes, scores
/// the rumor and prints the resulting reputation effects. Not an HTTP
/// server or CLI application (§1 Non-goals) — just enough to exercise
/// `GossipNode` end to end the way a host integration would.
fn main() {
    env_logger::init();

    let mut node = GossipNode::new(Config::default());
    let mut sink = NullSnapshotSink;
    let mut now = 0i64;

    let join = br#"{"type":"JOIN","version":"1.0","payload":{"commitment":"c-alice","nullifier":"alice","dkimProof":{"domain":"university.edu"}}}"#;
    node.ingest_envelope("/identity/1.0", join, now, &mut sink)
        .expect("join should be accepted");

    let rumor = br#"{"type":"RUMOR","version":"1.0","payload":{"id":"r1","text":"dining hall closes at 8pm tonight","topic":"facilities","zkProof":{"nullifier":"alice","merkleRoot":"root1"}}}"#;
    node.ingest_envelope("/rumors/1.0", rumor, now, &mut sink)
        .expect("rumor should be accepted");

    for (voter, choice) in [("bob", "TRUE"), ("carol", "TRUE"), ("dave", "FALSE")] {
        now += 1;
        let payload = format!(
            r#"{{"type":"VOTE","version":"1.0","payload":{{"rumorId":"r1","vote":"{choice}","prediction":{{"TRUE":0.8,"FALSE":0.15,"UNVERIFIED":0.05}},"stakeAmount":1,"zkProof":{{"nullifier":"{voter}"}}}}}}"#
        );
        node.ingest_envelope("/votes/1.0", payload.as_bytes(), now, &mut sink)
            .expect("vote should be accepted");
    }

    if let Some(result) = node.score_rumor(&rumorcast_data_structures::RumorId("r1".into()), 1) {
        info!("rumor trust score: {:.1}", result.rumor_trust_score);
        info!("consensus: {:?}", result.consensus);
    }

    let trust = node.propagate_trust(&Default::default());
    info!("trust propagation converged={} in {} iterations", trust.converged, trust.iterations);

    node.tombstone(
        rumorcast_data_structures::RumorId("r1".into()),
        rumorcast_data_structures::Nullifier("alice".into()),
        TombstoneReason::Retracted,
        now + 1,
        &mut sink,
    )
    .expect("author may retract their own rumor");

    info!(
        "final view: {} active rumors, {} tombstoned",
        node.view().state().rumors.len(),
        node.view().state().tombstones.len()
    );
}
