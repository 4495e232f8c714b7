pub const HELP: &str = r#"
Available commands:

-<mi command>                               -- send a machine interface command, print its result
var <name> <expression>                     -- create a variable object for an expression
children <name>                             -- list children of a variable object
format <name> <format>                      -- set display format (natural|binary|octal|decimal|hexadecimal)
assign <name> <expression>                  -- assign a new value to a variable object
update                                      -- re-read all variable objects, print changes
h, help                                     -- show help
q, quit                                     -- exit
"#;
