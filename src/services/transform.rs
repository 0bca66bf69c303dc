use tracing::debug;

use crate::error::TransformError;
use crate::model::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::model::value::{Mapping, NestedValue};

/// A text-to-text transform applied to every scalar leaf of an asset tree.
///
/// Takes `&mut self` because adapters keep state between calls (caches,
/// counters).
pub trait ScalarTransform {
    fn transform(&mut self, text: &str) -> Result<String, TransformError>;
}

impl<F> ScalarTransform for F
where
    F: FnMut(&str) -> Result<String, TransformError>,
{
    fn transform(&mut self, text: &str) -> Result<String, TransformError> {
        self(text)
    }
}

/// Builds a transformed copy of `tree`.
///
/// Shape and order are preserved and null scalars are left alone. A failure
/// on a scalar directly under a mapping is returned as an error. A failure
/// anywhere inside a sequence instead keeps that whole sequence untouched and
/// reports a [`DiagnosticKind::SequenceElementTransform`] advisory.
pub fn apply(
    tree: &NestedValue,
    f: &mut dyn ScalarTransform,
    sink: &dyn DiagnosticSink,
) -> Result<NestedValue, TransformError> {
    apply_guarded(tree, f, sink, "")
}

/// Number of leaves [`apply`] hands to the transform, in the same visiting order.
pub fn count_scalars(tree: &NestedValue) -> usize {
    match tree {
        NestedValue::Mapping(m) => m.iter().map(|(_, v)| count_scalars(v)).sum(),
        NestedValue::Sequence(items) => items.iter().map(count_scalars).sum(),
        NestedValue::Scalar(Some(_)) => 1,
        NestedValue::Scalar(None) => 0,
    }
}

fn apply_guarded(
    value: &NestedValue,
    f: &mut dyn ScalarTransform,
    sink: &dyn DiagnosticSink,
    path: &str,
) -> Result<NestedValue, TransformError> {
    if !matches!(value, NestedValue::Sequence(_)) {
        return apply_at(value, f, sink, path);
    }

    match apply_at(value, f, sink, path) {
        Ok(v) => Ok(v),
        Err(e) => {
            debug!(key = path, error = %e, "keeping sequence untranslated");
            let diag = Diagnostic::new(
                DiagnosticKind::SequenceElementTransform,
                format!("couldn't transform sequence, keeping original: {e}"),
            );
            sink.emit(if path.is_empty() { diag } else { diag.with_key(path) });
            Ok(value.clone())
        }
    }
}

fn apply_at(
    value: &NestedValue,
    f: &mut dyn ScalarTransform,
    sink: &dyn DiagnosticSink,
    path: &str,
) -> Result<NestedValue, TransformError> {
    match value {
        NestedValue::Mapping(m) => {
            let mut out = Mapping::with_capacity(m.len());
            for (k, v) in m.iter() {
                let child = if path.is_empty() {
                    k.to_string()
                } else {
                    format!("{path}/{k}")
                };
                out.insert(k, apply_guarded(v, f, sink, &child)?);
            }
            Ok(NestedValue::Mapping(out))
        }
        NestedValue::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(apply_at(item, f, sink, &format!("{path}[{i}]"))?);
            }
            Ok(NestedValue::Sequence(out))
        }
        NestedValue::Scalar(Some(s)) => Ok(NestedValue::text(f.transform(s)?)),
        NestedValue::Scalar(None) => Ok(NestedValue::null()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::diagnostic::CollectingSink;

    fn sample() -> NestedValue {
        let scripts: Mapping = [("a", NestedValue::text("b"))].into_iter().collect();
        let items: Mapping = [(
            "x",
            NestedValue::Sequence(vec!["a".into(), "b".into(), NestedValue::null(), "c".into()]),
        )]
        .into_iter()
        .collect();
        let root: Mapping = [
            ("Scripts", NestedValue::from(scripts)),
            ("Items", NestedValue::from(items)),
            ("Empty", NestedValue::null()),
        ]
        .into_iter()
        .collect();
        root.into()
    }

    fn upper(s: &str) -> Result<String, TransformError> {
        Ok(s.to_uppercase())
    }

    #[test]
    fn identity_keeps_tree() {
        let tree = sample();
        let sink = CollectingSink::new();
        let mut id = |s: &str| Ok::<_, TransformError>(s.to_string());

        assert_eq!(apply(&tree, &mut id, &sink).unwrap(), tree);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn calls_match_count_and_skip_nulls() {
        let tree = sample();
        let sink = CollectingSink::new();
        let mut seen = Vec::new();
        let mut record = |s: &str| {
            seen.push(s.to_string());
            Ok::<_, TransformError>(s.to_string())
        };

        apply(&tree, &mut record, &sink).unwrap();

        assert_eq!(count_scalars(&tree), 4);
        assert_eq!(seen, vec!["b", "a", "b", "c"]);
    }

    #[test]
    fn upper_transforms_leaves_in_place() {
        let out = apply(&sample(), &mut upper, &CollectingSink::new()).unwrap();

        assert_eq!(out.get("Scripts").and_then(|m| m.get("a")), Some(&NestedValue::text("B")));
        assert_eq!(
            out.get("Items").and_then(|m| m.get("x")).and_then(|s| s.as_sequence()).unwrap(),
            &[
                NestedValue::text("A"),
                NestedValue::text("B"),
                NestedValue::null(),
                NestedValue::text("C")
            ]
        );
        assert_eq!(out.get("Empty"), Some(&NestedValue::null()));
    }

    #[test]
    fn count_of_empty_containers_is_zero() {
        assert_eq!(count_scalars(&Mapping::new().into()), 0);
        let nested: Mapping = [("x", NestedValue::from(Mapping::new()))].into_iter().collect();
        assert_eq!(count_scalars(&nested.into()), 0);

        let hundred: Vec<NestedValue> = (0..100).map(|i| NestedValue::text(i.to_string())).collect();
        let root: Mapping = [("r", NestedValue::from(hundred))].into_iter().collect();
        assert_eq!(count_scalars(&root.into()), 100);
    }

    fn fail_on_boom(s: &str) -> Result<String, TransformError> {
        if s == "boom" {
            Err(TransformError::Rejected(s.to_string()))
        } else {
            Ok(s.to_uppercase())
        }
    }

    #[test]
    fn failing_sequence_falls_back_to_original() {
        let seq = NestedValue::Sequence(vec!["ok".into(), "boom".into()]);
        let tree: NestedValue = Mapping::from_iter([
            ("list", seq.clone()),
            ("name", NestedValue::text("fine")),
        ])
        .into();
        let sink = CollectingSink::new();

        let out = apply(&tree, &mut fail_on_boom, &sink).unwrap();

        assert_eq!(out.get("list"), Some(&seq));
        assert_eq!(out.get("name"), Some(&NestedValue::text("FINE")));
        let diags = sink.take();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::SequenceElementTransform);
        assert_eq!(diags[0].key.as_deref(), Some("list"));
    }

    #[test]
    fn failing_scalar_under_mapping_propagates() {
        let tree: NestedValue = Mapping::from_iter([("a", NestedValue::text("boom"))]).into();
        let sink = CollectingSink::new();

        assert!(apply(&tree, &mut fail_on_boom, &sink).is_err());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn mappings_inside_sequences_are_recursed() {
        let inner: Mapping = [("s", NestedValue::text("y"))].into_iter().collect();
        let tree: NestedValue =
            Mapping::from_iter([("arr", NestedValue::Sequence(vec![inner.into(), "str".into()]))]).into();

        let out = apply(&tree, &mut upper, &CollectingSink::new()).unwrap();

        let arr = out.get("arr").and_then(|a| a.as_sequence()).unwrap();
        assert_eq!(arr[0].get("s"), Some(&NestedValue::text("Y")));
        assert_eq!(arr[1], NestedValue::text("STR"));
    }

    #[test]
    fn nested_failure_falls_back_at_outer_key() {
        let inner: Mapping = [("s", NestedValue::text("boom"))].into_iter().collect();
        let seq = NestedValue::Sequence(vec!["ok".into(), inner.into()]);
        let tree: NestedValue = Mapping::from_iter([("arr", seq.clone())]).into();
        let sink = CollectingSink::new();

        let out = apply(&tree, &mut fail_on_boom, &sink).unwrap();

        assert_eq!(out.get("arr"), Some(&seq));
        assert_eq!(sink.count(DiagnosticKind::SequenceElementTransform), 1);
    }

    #[test]
    fn failing_root_sequence_is_kept_whole() {
        let tree = NestedValue::Sequence(vec!["ok".into(), NestedValue::null(), "boom".into()]);
        let sink = CollectingSink::new();

        let out = apply(&tree, &mut fail_on_boom, &sink).unwrap();

        assert_eq!(out, tree);
        let diags = sink.take();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::SequenceElementTransform);
        assert_eq!(diags[0].key, None);
    }
}
