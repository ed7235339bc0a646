//! Binding of call-site arguments against a formal parameter list.
//!
//! Produces per-parameter facts for one call, or `None` when the call
//! cannot be bound (too many positionals, unknown keyword); unbindable
//! calls are skipped by the caller, never reported as errors.

use crate::analysis::observations::TypeFact;
use crate::syntax::ast::Param;

/// Bind one call. `implicit` is the instance argument prepended for
/// constructor and `__call__` dispatch; `has_star_args`/`has_kw_args`
/// flag `*rest`/`**extra` at the call site, which make every unfilled
/// parameter unknowable rather than unbound.
pub fn bind_arguments(
    params: &[Param],
    implicit: Option<TypeFact>,
    args: &[TypeFact],
    keywords: &[(String, TypeFact)],
    has_star_args: bool,
    has_kw_args: bool,
) -> Option<Vec<(String, TypeFact)>> {
    let mut facts: Vec<Option<TypeFact>> = vec![None; params.len()];
    let mut positionals: Vec<TypeFact> = Vec::new();
    positionals.extend(implicit);
    positionals.extend(args.iter().cloned());

    let mut next = 0usize;
    for (i, param) in params.iter().enumerate() {
        if param.star {
            // Swallows the remaining positionals as a tuple.
            if next < positionals.len() {
                facts[i] = Some(TypeFact::Unknown);
                next = positionals.len();
            }
            continue;
        }
        if param.double_star {
            continue;
        }
        if next < positionals.len() {
            facts[i] = Some(positionals[next].clone());
            next += 1;
        }
    }
    if next < positionals.len() {
        return None;
    }

    for (name, fact) in keywords {
        match params
            .iter()
            .position(|p| !p.star && !p.double_star && p.name == *name)
        {
            Some(i) => {
                if facts[i].is_some() {
                    // Also filled positionally.
                    return None;
                }
                facts[i] = Some(fact.clone());
            }
            None => {
                if !params.iter().any(|p| p.double_star) {
                    return None;
                }
            }
        }
    }

    if has_star_args || has_kw_args {
        for fact in facts.iter_mut() {
            if fact.is_none() {
                *fact = Some(TypeFact::Unknown);
            }
        }
    }

    Some(
        params
            .iter()
            .zip(facts)
            .filter_map(|(param, fact)| fact.map(|f| (param.name.clone(), f)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(spec: &[(&str, bool, bool)]) -> Vec<Param> {
        spec.iter()
            .map(|(name, star, double_star)| Param {
                name: name.to_string(),
                default: None,
                star: *star,
                double_star: *double_star,
            })
            .collect()
    }

    #[test]
    fn test_positional_and_keyword_mix() {
        let params = params(&[("a", false, false), ("b", false, false)]);
        let bound = bind_arguments(
            &params,
            None,
            &[TypeFact::Num],
            &[("b".to_string(), TypeFact::Str)],
            false,
            false,
        )
        .expect("bindable");
        assert_eq!(
            bound,
            vec![
                ("a".to_string(), TypeFact::Num),
                ("b".to_string(), TypeFact::Str)
            ]
        );
    }

    #[test]
    fn test_implicit_instance_fills_first_parameter() {
        let params = params(&[("self", false, false), ("x", false, false)]);
        let bound = bind_arguments(
            &params,
            Some(TypeFact::Instance {
                class: "C".to_string(),
            }),
            &[TypeFact::Num],
            &[],
            false,
            false,
        )
        .expect("bindable");
        assert_eq!(bound[0].0, "self");
        assert_eq!(
            bound[0].1,
            TypeFact::Instance {
                class: "C".to_string()
            }
        );
        assert_eq!(bound[1], ("x".to_string(), TypeFact::Num));
    }

    #[test]
    fn test_too_many_positionals_is_unbindable() {
        let params = params(&[("a", false, false)]);
        assert!(bind_arguments(&params, None, &[TypeFact::Num, TypeFact::Num], &[], false, false).is_none());
    }

    #[test]
    fn test_star_param_absorbs_extras() {
        let params = params(&[("a", false, false), ("rest", true, false)]);
        let bound = bind_arguments(
            &params,
            None,
            &[TypeFact::Num, TypeFact::Str, TypeFact::Str],
            &[],
            false,
            false,
        )
        .expect("bindable");
        assert_eq!(bound[0], ("a".to_string(), TypeFact::Num));
        assert_eq!(bound[1], ("rest".to_string(), TypeFact::Unknown));
    }

    #[test]
    fn test_unknown_keyword_without_kwargs_is_unbindable() {
        let params = params(&[("a", false, false)]);
        assert!(
            bind_arguments(
                &params,
                None,
                &[],
                &[("zzz".to_string(), TypeFact::Num)],
                false,
                false
            )
            .is_none()
        );
    }

    #[test]
    fn test_duplicate_binding_is_unbindable() {
        let params = params(&[("a", false, false)]);
        assert!(
            bind_arguments(
                &params,
                None,
                &[TypeFact::Num],
                &[("a".to_string(), TypeFact::Str)],
                false,
                false
            )
            .is_none()
        );
    }
}
