//! Mutation engine and structural walker tests.

use ldapprobe::catalog::{Catalog, TestCase};
use ldapprobe::codec::{DeclaredLength, Tag};
use ldapprobe::malform::LengthFault;
use ldapprobe::mutate::{self, MutationEngine, MutationKind, TargetedOp, MAX_RANDOM_EDITS};
use ldapprobe::walk::{self, BinaryWalker};

const ANONYMOUS_BIND: [u8; 14] = [0x30, 0x0c, 0x02, 0x01, 0x01, 0x60, 0x07, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00];

fn bind_corpus() -> Vec<TestCase> {
    vec![TestCase::new("0.0.0.1", "Anonymous bind", "canonical", ANONYMOUS_BIND.to_vec(), "success")]
}

fn differing_offsets(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

#[test]
fn test_random_mutations_are_reproducible() {
    let corpus = Catalog::all().cases();
    let first = MutationEngine::new(7).random(&corpus, 25);
    let second = MutationEngine::new(7).random(&corpus, 25);
    assert_eq!(first, second);
    assert_eq!(MutationEngine::new(7).seed(), 7);
}

#[test]
fn test_random_mutation_edits_few_bytes() {
    let corpus = Catalog::all().cases();
    let mutations = MutationEngine::new(42).generate(MutationKind::Random, &corpus, 50);
    assert_eq!(mutations.len(), 50);
    for (i, m) in mutations.iter().enumerate() {
        assert_eq!(m.id, format!("MUT.R.{}", i + 1));
        assert_eq!(m.payloads.len(), 1);
        let mutated = &m.payloads[0];
        let base_id = m.name.trim_start_matches("Random mutation of ");
        let base = corpus.iter().find(|c| c.id == base_id).expect("baseline case");
        let matched = base.payloads.iter().any(|p| {
            let n = differing_offsets(p, mutated);
            p.len() == mutated.len() && (1..=MAX_RANDOM_EDITS).contains(&n)
        });
        assert!(matched, "{} does not derive from {}", m.id, base_id);
        assert_eq!(m.expected, base.expected);
    }
}

#[test]
fn test_random_on_empty_corpus() {
    assert!(MutationEngine::new(1).random(&[], 10).is_empty());
    let empty_payload = vec![TestCase::new("x", "x", "x", Vec::new(), "x")];
    assert!(MutationEngine::new(1).random(&empty_payload, 10).is_empty());
}

#[test]
fn test_targeted_ops_on_bind() {
    let mutations = mutate::targeted(&bind_corpus(), 100);
    assert_eq!(mutations.len(), TargetedOp::all().len());
    assert_eq!(mutations.len(), 8);
    assert_eq!(mutations[0].id, "MUT.T.1");

    let p = |i: usize| mutations[i].payloads[0].clone();
    // tag replaced
    assert_eq!(&p(0)[..7], &[0x30, 0x0c, 0x02, 0x01, 0x01, 0xFF, 0x07]);
    // constructed bit cleared
    assert_eq!(p(1)[5], 0x40);
    // indefinite and too-short keep the size
    assert_eq!(&p(2)[5..7], &[0x60, 0x80]);
    assert_eq!(&p(3)[5..7], &[0x60, 0x03]);
    // too-long grows by two octets; envelope length follows
    assert_eq!(&p(4)[..9], &[0x30, 0x0e, 0x02, 0x01, 0x01, 0x60, 0x82, 0x03, 0xEF]);
    // four-octet forms grow by four
    assert_eq!(&p(5)[..11], &[0x30, 0x10, 0x02, 0x01, 0x01, 0x60, 0x84, 0x7F, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&p(6)[..11], &[0x30, 0x10, 0x02, 0x01, 0x01, 0x60, 0x84, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(p(7)[1], 0x14);
    assert_eq!(p(7)[6], 0x88);
    for m in &mutations {
        assert!(m.name.ends_with("on 0.0.0.1"), "{}", m.name);
        assert_eq!(&m.payloads[0][m.payloads[0].len() - 7..], &ANONYMOUS_BIND[7..]);
    }
}

#[test]
fn test_targeted_respects_count() {
    let corpus = Catalog::all().cases();
    let mutations = MutationEngine::new(0).generate(MutationKind::Targeted, &corpus, 11);
    assert_eq!(mutations.len(), 11);
    assert_eq!(mutations[10].id, "MUT.T.11");
    assert!(mutations[8].name.ends_with("1.1.1.2"));
}

#[test]
fn test_targeted_skips_unreadable_payloads() {
    let corpus = vec![TestCase::new("x", "junk", "", vec![0x1F], ""), bind_corpus().remove(0)];
    let mutations = mutate::targeted(&corpus, 3);
    assert_eq!(mutations.len(), 3);
    assert!(mutations.iter().all(|m| m.name.ends_with("0.0.0.1")));
}

#[test]
fn test_apply_targeted_leaves_truncated_parent_alone() {
    // envelope claims 0x7F bytes; only the message id and bind are present
    let mut data = ANONYMOUS_BIND.to_vec();
    data[1] = 0x7F;
    let spans = walk::scan(&data);
    let target = spans[2];
    let out = mutate::apply_targeted(&data, &spans, &target, TargetedOp::Length(LengthFault::TooLong));
    assert_eq!(out[1], 0x7F);
    assert_eq!(out.len(), data.len() + 2);
}

#[test]
fn test_mutation_kind_parsing() {
    assert_eq!("random".parse::<MutationKind>(), Ok(MutationKind::Random));
    assert_eq!(" Targeted ".parse::<MutationKind>(), Ok(MutationKind::Targeted));
    assert_eq!("bitflip".parse::<MutationKind>(), Err("bitflip".to_string()));
    assert_eq!(MutationKind::Targeted.to_string(), "targeted");
    assert_eq!(TargetedOp::Length(LengthFault::MaxInt32).to_string(), "length max_int32");
}

#[test]
fn test_walker_spans() {
    let spans = walk::scan(&ANONYMOUS_BIND);
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0].tag, Tag::SEQUENCE);
    assert_eq!(spans[0].declared, DeclaredLength::Definite(12));
    assert_eq!(spans[1].content_range(), 4..5);
    assert_eq!(spans[2].tag, Tag::application(0, true));
    assert_eq!(spans[2].length_range(), 6..7);
    assert_eq!(spans[2].end(), ANONYMOUS_BIND.len());
    assert!(spans.iter().all(|s| !s.is_truncated()));

    let bind_children: Vec<_> = BinaryWalker::children(&ANONYMOUS_BIND, &spans[2]).collect();
    assert_eq!(bind_children.len(), 3);
    assert_eq!(bind_children[2].tag, Tag::context(0, false));
    assert_eq!(bind_children[2].depth, 2);
}

#[test]
fn test_message_extent() {
    assert_eq!(walk::message_extent(&ANONYMOUS_BIND), Some(14));
    let mut two = ANONYMOUS_BIND.to_vec();
    two.extend_from_slice(&ANONYMOUS_BIND);
    assert_eq!(walk::message_extent(&two), Some(14));
    assert_eq!(walk::message_extent(&ANONYMOUS_BIND[..10]), None);
    assert_eq!(walk::message_extent(&[0x30, 0x80, 0x00, 0x00]), None);
    assert_eq!(walk::message_extent(&[0x30, 0x88, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]), None);
}

#[test]
fn test_walker_position() {
    let mut walker = BinaryWalker::new(&ANONYMOUS_BIND);
    assert_eq!(walker.position(), 0);
    assert!(walker.next().is_some());
    assert_eq!(walker.position(), 14);
    assert!(walker.next().is_none());
}
