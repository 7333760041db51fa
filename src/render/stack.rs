use crate::{Error, Result, Value};

/// The context stack.
///
/// `with` and `loop` push a new context for their body and pop it afterwards.
/// The top of the stack is the context bare references are resolved against.
#[cfg_attr(test, derive(Debug))]
pub struct Stack {
    stack: Vec<Value>,
}

impl Stack {
    /// Construct a stack seeded with the initial context.
    pub fn new(context: Value) -> Self {
        Self {
            stack: vec![context],
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or_else(Error::stack_underflow)
    }

    /// The current context.
    ///
    /// # Panics
    ///
    /// If the stack is empty. Rendering never pops the initial context.
    pub fn top(&self) -> &Value {
        match self.stack.last() {
            Some(value) => value,
            None => panic!("context stack is empty, cannot get current context"),
        }
    }

    /// The initial context, referenced as `$Top`.
    pub fn bottom(&self) -> &Value {
        match self.stack.first() {
            Some(value) => value,
            None => panic!("context stack is empty, cannot get top context"),
        }
    }

    /// The context enclosing the current one, referenced as `$Up`. At depth
    /// one this is the initial context.
    pub fn up(&self) -> &Value {
        match self.stack.len() {
            0 | 1 => self.bottom(),
            n => &self.stack[n - 2],
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ErrorKind;

    #[test]
    fn stack_relative_contexts() {
        let mut stack = Stack::new(Value::from("page"));
        assert_eq!(stack.up(), &Value::from("page"));

        stack.push(Value::from("child"));
        stack.push(Value::from("grandchild"));
        assert_eq!(stack.top(), &Value::from("grandchild"));
        assert_eq!(stack.up(), &Value::from("child"));
        assert_eq!(stack.bottom(), &Value::from("page"));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn stack_pop_underflow() {
        let mut stack = Stack::new(Value::None);
        stack.pop().unwrap();
        let err = stack.pop().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StackUnderflow);
    }

    #[test]
    #[should_panic(expected = "context stack is empty")]
    fn stack_top_empty_panics() {
        let mut stack = Stack::new(Value::None);
        stack.pop().unwrap();
        stack.top();
    }
}
