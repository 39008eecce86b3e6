//! Model-based check of the attach stack
//!
//! Random attach/detach/clear sequences are replayed against a plain `Vec`
//! model. After every step the manager's depth and current context must
//! match the model. Mismatched tokens are generated on purpose.

use proptest::prelude::*;
use strata_context::{Context, ContextManager, Key};

#[derive(Debug, Clone)]
enum Op {
    Attach(u16),
    Detach,
    DetachWithToken(usize),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u16>().prop_map(Op::Attach),
        3 => Just(Op::Detach),
        2 => (0usize..8).prop_map(Op::DetachWithToken),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn manager_matches_stack_model(ops in proptest::collection::vec(op_strategy(), 1..64)) {
        ContextManager::clear();

        let key: Key<u16> = Key::new("model");
        let mut current: Option<u16> = None;
        let mut stack: Vec<Option<u16>> = Vec::new();

        for op in ops {
            match op {
                Op::Attach(v) => {
                    let token = ContextManager::attach(Context::root().set_value(&key, v));
                    stack.push(current);
                    current = Some(v);
                    prop_assert_eq!(token.depth(), stack.len());
                }
                Op::Detach => {
                    ContextManager::detach(None);
                    current = stack.pop().unwrap_or(None);
                }
                Op::DetachWithToken(t) => {
                    ContextManager::detach(Some(t.into()));
                    current = stack.pop().unwrap_or(None);
                }
                Op::Clear => {
                    ContextManager::clear();
                    stack.clear();
                    current = None;
                }
            }

            prop_assert_eq!(ContextManager::depth(), stack.len());
            prop_assert_eq!(ContextManager::value(&key).map(|v| *v), current);
        }

        ContextManager::clear();
    }
}
