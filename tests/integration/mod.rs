// Integration tests harness
mod coroutines {
    include!("coroutines.rs");
}
mod close {
    include!("close.rs");
}
mod errors {
    include!("errors.rs");
}
mod language {
    include!("language.rs");
}
mod stdlib {
    include!("stdlib.rs");
}
mod host {
    include!("host.rs");
}
