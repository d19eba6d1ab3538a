// Static pages; the todo list itself is driven by the JSON endpoints

pub const REGISTER_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Register</title></head>
<body>
  <h1>Register</h1>
  <form action="/register" method="POST">
    <input type="text" name="name" placeholder="Name" />
    <input type="email" name="email" placeholder="Email" />
    <input type="text" name="username" placeholder="Username" />
    <input type="password" name="password" placeholder="Password" />
    <button type="submit">Register</button>
  </form>
  <a href="/login">Already have an account?</a>
</body>
</html>"#;

pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
  <h1>Login</h1>
  <form action="/login" method="POST">
    <input type="text" name="loginId" placeholder="Email or username" />
    <input type="password" name="password" placeholder="Password" />
    <button type="submit">Login</button>
  </form>
  <a href="/register">Create an account</a>
</body>
</html>"#;

pub const DASHBOARD_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Dashboard</title></head>
<body>
  <h1>Todos</h1>
  <form id="create_form">
    <input type="text" id="create_field" name="todo" placeholder="What needs doing?" />
    <button type="submit">Add</button>
  </form>
  <p id="message"></p>
  <ul id="item_list"></ul>
  <button type="button" id="load_more">Load more</button>
  <form action="/logout" method="POST"><button type="submit">Logout</button></form>
  <form action="/logout_from_all_devices" method="POST">
    <button type="submit">Logout from all devices</button>
  </form>
  <script>
    const list = document.getElementById("item_list");
    const message = document.getElementById("message");
    let skip = 0;

    async function call(method, url, body) {
      const response = await fetch(url, {
        method,
        headers: { "Content-Type": "application/json" },
        body: body === undefined ? undefined : JSON.stringify(body),
      });
      const envelope = await response.json();
      message.textContent = response.ok ? "" : envelope.message;
      return response.ok ? envelope.data : null;
    }

    function render(todo) {
      const item = document.createElement("li");
      const text = document.createElement("span");
      text.textContent = todo.text;
      const edit = document.createElement("button");
      edit.textContent = "Edit";
      edit.onclick = async () => {
        const newText = prompt("Edit todo", text.textContent);
        if (newText !== null && (await call("POST", "/edit-item", { id: todo.id, newText }))) {
          text.textContent = newText;
        }
      };
      const remove = document.createElement("button");
      remove.textContent = "Delete";
      remove.onclick = async () => {
        if (await call("DELETE", "/delete-item", { id: todo.id })) {
          item.remove();
          skip -= 1;
        }
      };
      item.append(text, edit, remove);
      list.append(item);
    }

    async function loadPage() {
      const todos = await call("GET", "/read-item?skip=" + skip);
      if (todos) {
        todos.forEach(render);
        skip += todos.length;
      }
    }

    document.getElementById("create_form").onsubmit = async (event) => {
      event.preventDefault();
      const field = document.getElementById("create_field");
      const todo = await call("POST", "/create-item", { todo: field.value });
      if (todo) {
        render(todo);
        skip += 1;
        field.value = "";
      }
    };
    document.getElementById("load_more").onclick = loadPage;
    loadPage();
  </script>
</body>
</html>"#;
